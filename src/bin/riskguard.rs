#[cfg(not(target_arch = "wasm32"))]
use anyhow::Result;
#[cfg(not(target_arch = "wasm32"))]
use riskguard::cli::{actions, start};

// Main function
#[cfg(not(target_arch = "wasm32"))]
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Start the program
    let (action, globals) = start()?;

    // Handle the action
    actions::session::handle(action, &globals).await?;

    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {}
