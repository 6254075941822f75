use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "ferrftpd", about = "An FTP server written in Rust.")]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory served to clients, overrides server.root_dir
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Control port, overrides server.listen_port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Enable verbose mode
    #[arg(short, long)]
    pub verbose: bool,

    /// Print a bcrypt hash of the given password for a passwd file and exit
    #[arg(long, value_name = "PASSWORD")]
    pub hash_password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from(["ferrftpd", "-c", "ftp.conf", "--root", "/srv", "-p", "2121", "-v"]);
        assert_eq!(cli.config, Some(PathBuf::from("ftp.conf")));
        assert_eq!(cli.root, Some(PathBuf::from("/srv")));
        assert_eq!(cli.port, Some(2121));
        assert!(cli.verbose);
        assert!(cli.hash_password.is_none());
    }
}
