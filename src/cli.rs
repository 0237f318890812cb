//! Command line interface

use clap::Parser;

/// Serve a directory over HTTP for browsing and downloading on the local network
#[derive(Debug, Clone, Parser)]
#[command(name = "lanshare", version, about)]
pub struct Cli {
    /// Port to listen on [default: 8000]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory to serve [default: files]
    #[arg(short, long)]
    pub dir: Option<String>,

    /// Address to bind [default: 0.0.0.0]
    #[arg(long)]
    pub host: Option<String>,

    /// Config file path without extension [default: lanshare]
    #[arg(short, long)]
    pub config: Option<String>,
}
