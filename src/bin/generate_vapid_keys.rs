// src/bin/generate_vapid_keys.rs
//
// Prints a VAPID key pair as .env lines.

use dodo_backend::services::web_push_gateway::generate_vapid_keys;

fn main() -> anyhow::Result<()> {
    let keys = generate_vapid_keys()?;

    println!("VAPID keys generated successfully");
    println!("VAPID_PUBLIC_KEY={}", keys.public_key);
    // One line, the way Settings::from_env expects it
    println!("VAPID_PRIVATE_KEY=\"{}\"", keys.private_key_pem.trim_end().replace('\n', "\\n"));

    Ok(())
}
