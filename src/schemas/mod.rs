pub mod extract;
pub mod schema;

pub use extract::extract_json;
pub use schema::{parse_payload, prompt_schema, HotelsPayload, ResponseSchema};
