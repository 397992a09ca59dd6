//! JSON test vector loader shared by room code and envelope tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::fs;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RoomCodeVector {
    pub description: String,
    pub input: String,
    #[serde(default)]
    pub min_len: Option<usize>,
    #[serde(default)]
    pub expect: Option<String>,
    #[serde(default)]
    pub expect_error: Option<ExpectError>,
}

#[derive(Debug, Deserialize)]
pub struct ExpectError {
    pub code: String,
}

pub fn load_str(name: &str) -> String {
    fs::read_to_string(format!("tests/vectors/{name}")).unwrap()
}

pub fn load_room_codes(name: &str) -> Vec<RoomCodeVector> {
    serde_json::from_str(&load_str(name)).expect("invalid room code vectors")
}
