//! Token commands - inspect LUKS2 tokens

use super::Session;
use anyhow::{Context, Result};
use cryptdl::TokenInfo;

fn describe(info: TokenInfo) -> String {
    match info {
        TokenInfo::Invalid => "invalid".to_string(),
        TokenInfo::Inactive => "inactive".to_string(),
        TokenInfo::Internal => "internal".to_string(),
        TokenInfo::InternalUnknown => "internal (unknown type)".to_string(),
        TokenInfo::External => "external".to_string(),
        TokenInfo::ExternalUnknown => "external (no handler)".to_string(),
        TokenInfo::Unknown(raw) => format!("unknown ({})", raw),
    }
}

pub fn json(session: &Session, path: &str, id: i32) -> Result<()> {
    let device = session.load(path)?;
    let json = device
        .token_json_get(id)
        .with_context(|| format!("Token {} not found on {}", id, path))?;
    println!("{}", json);
    Ok(())
}

pub fn status(session: &Session, path: &str, id: i32) -> Result<()> {
    let device = session.load(path)?;
    let (info, token_type) = device.token_status(id);
    match token_type {
        Some(token_type) => println!("token {}: {}, type {}", id, describe(info), token_type),
        None => println!("token {}: {}", id, describe(info)),
    }
    Ok(())
}
