pub mod owner;
pub mod request_id;

pub use owner::{OWNER_HEADER, Owner, require_owner};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
