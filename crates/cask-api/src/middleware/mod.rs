pub mod reject_dotdot;
pub mod request_id;

pub use reject_dotdot::reject_dotdot;
pub use request_id::{request_id_middleware, RequestId};
