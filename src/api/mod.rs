mod handlers;
mod routes;
mod search_console;

pub use handlers::{error_response, ApiError, AppState, ErrorResponse, SuccessResponse};
pub use routes::create_api_router;
