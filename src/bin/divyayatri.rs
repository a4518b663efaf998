use anyhow::Result;
use divyayatri::cli::{actions::session, start};

// Main function
#[tokio::main]
async fn main() -> Result<()> {
    // Start the program
    let (globals, action) = start()?;

    // Handle the action
    session::handle(action, &globals).await?;

    Ok(())
}
