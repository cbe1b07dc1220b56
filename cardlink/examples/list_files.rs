//! Directory listing example

use cardlink::{CardSession, TcpTransport};

#[tokio::main]
async fn main() -> cardlink::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let ip = std::env::var("CARD_IP").unwrap_or_else(|_| "192.168.1.80".to_string());
    let path = std::env::args().nth(1).unwrap_or_else(|| "/".to_string());

    let mut session = CardSession::new(TcpTransport::new(ip, 9100));
    session.connect().await?;

    let listing = session.list(&path).await?;
    println!("{}", listing.status_message());
    print!("{}", String::from_utf8_lossy(&listing.body_bytes()));

    session.disconnect().await?;

    Ok(())
}
