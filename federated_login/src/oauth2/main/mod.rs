mod code;
mod idtoken;
mod token;
mod utils;

pub use code::{CODE_PARAM, extract_authorization_code, parse_query};
pub use idtoken::{IdTokenVerifier, decode_claims};
pub use token::{HttpTokenClient, TokenClient};
