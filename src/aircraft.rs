use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tabled::Tabled;

pub type AircraftId = Arc<str>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Tabled)]
pub struct Aircraft {
    pub id: AircraftId,
    pub name: String,
    pub airline: String,
}
