//! File upload example: store a local file on the card and finalize it

use cardlink::{CardSession, Status, TcpTransport};

#[tokio::main]
async fn main() -> cardlink::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let mut args = std::env::args().skip(1);
    let local = args.next().unwrap_or_else(|| "README.md".to_string());
    let remote = args.next().unwrap_or_else(|| "/data/upload.bin".to_string());

    let ip = std::env::var("CARD_IP").unwrap_or_else(|_| "192.168.1.80".to_string());

    let mut session = CardSession::new(TcpTransport::new(ip, 9100));
    session.connect().await?;

    let mut source = tokio::fs::File::open(&local).await?;
    let response = session.put(&remote, &mut source).await?;
    println!("STOR: {}", response.status_message());

    if response.status() == Status::TransferComplete {
        let response = session.finalize(&remote).await?;
        println!("SRFT: {}", response.status_message());
        println!("Uploaded {} bytes", session.transfer_progress());
    }

    session.disconnect().await?;

    Ok(())
}
