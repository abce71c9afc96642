use std::path::PathBuf;

use clap::Parser;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use pipecrypt::EncryptClient;

#[derive(Parser)]
#[command(name = "pipecrypt-cli")]
#[command(about = "Encrypt a file or stdin through a running pipecrypt server", long_about = None)]
struct Cli {
    /// Server socket path.
    #[arg(short, long)]
    socket: PathBuf,

    #[arg(short, long)]
    username: String,

    #[arg(short, long)]
    password: String,

    /// Encryption key.
    #[arg(short, long)]
    key: String,

    /// Input file; stdin when omitted.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file; stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Bytes sent per data packet. Must not exceed the server's chunk limit.
    #[arg(long, default_value_t = 4096)]
    chunk_size: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    if cli.chunk_size == 0 {
        return Err("chunk size must be positive".into());
    }

    let mut client = EncryptClient::connect(&cli.socket, &cli.username, &cli.password, cli.key.as_bytes()).await?;

    let input: Box<dyn AsyncRead + Unpin> = match &cli.input {
        Some(path) => Box::new(tokio::fs::File::open(path).await?),
        None => Box::new(tokio::io::stdin()),
    };
    let output: Box<dyn AsyncWrite + Unpin> = match &cli.output {
        Some(path) => Box::new(tokio::fs::File::create(path).await?),
        None => Box::new(tokio::io::stdout()),
    };

    let total = pump(&mut client, input, output, cli.chunk_size).await?;
    client.close().await?;
    eprintln!("encrypted {total} bytes");

    // stdin reads run on a blocking thread that the runtime would wait for.
    std::process::exit(0);
}

async fn pump(
    client: &mut EncryptClient,
    mut input: impl AsyncRead + Unpin,
    mut output: impl AsyncWrite + Unpin,
    chunk_size: usize,
) -> Result<u64, Box<dyn std::error::Error>> {
    let mut buf = vec![0u8; chunk_size];
    let mut total = 0u64;
    loop {
        let filled = fill(&mut input, &mut buf).await?;
        if filled == 0 {
            break;
        }
        let encrypted = client.encrypt(&buf[..filled]).await?;
        output.write_all(&encrypted).await?;
        total += filled as u64;
    }
    output.flush().await?;
    Ok(total)
}

/// Read until `buf` is full or the input ends.
async fn fill(input: &mut (impl AsyncRead + Unpin), buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = input.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
