//! Diet plan data: types, strict codec, share export, and the user profile
//! a plan is generated from.

pub mod codec;
pub mod export;
pub mod profile;
pub mod types;

pub use codec::{CodecError, decode, decode_response, encode};
pub use export::export_text;
pub use profile::UserProfile;
pub use types::{DietPlan, Meal};
