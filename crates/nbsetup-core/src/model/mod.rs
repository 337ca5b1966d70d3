// Candidate records: what the model builder hands the engine.

mod assignment;
mod candidate;
mod device_type;

pub use assignment::{ASSIGNABLE_KINDS, AssignmentCandidate, ContentType, Priority};
pub use candidate::{Candidate, CheckKey, Fields, VlanRef, VlanScope, object, value_label};
pub use device_type::{ComponentKind, DeviceTypeCandidate};
