use serde::{ Serialize, Deserialize };
use super::chat::Turn;

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "chat")] Chat {
        content: String,
    },
    #[serde(rename = "reset")]
    Reset,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "render")] Render {
        turns: Vec<Turn>,
        pending: bool,
        timestamp: i64,
    },
    #[serde(rename = "error")] Error {
        message: String,
    },
}
