// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use anyhow::Result;
use clap::Parser;
use council_server::{config::ServerConfig, run_server};
use std::path::PathBuf;

/// Council API server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML file with server, storage, auth, llm and summary sections
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind, e.g. 0.0.0.0:8000
    #[arg(long, env = "COUNCIL_HTTP_ADDR")]
    http_addr: Option<String>,

    /// Directory holding the store snapshot
    #[arg(long, env = "COUNCIL_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Skip snapshots; records are lost on exit
    #[arg(long)]
    no_persist: bool,
}

impl Args {
    /// Flags win over the file and environment
    fn apply(self, config: &mut ServerConfig) {
        if let Some(addr) = self.http_addr {
            config.server.listen_addr = addr;
        }
        if let Some(data_dir) = self.data_dir {
            config.storage.data_dir = data_dir;
        }
        if self.no_persist {
            config.storage.persist = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = Args::parse();
    let mut config = ServerConfig::load(args.config.take())?;
    args.apply(&mut config);

    run_server(config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = Args::try_parse_from([
            "council-server",
            "--http-addr",
            "0.0.0.0:9000",
            "--data-dir",
            "/tmp/council",
            "--no-persist",
        ])
        .unwrap();

        let mut config = ServerConfig::default();
        args.apply(&mut config);

        assert_eq!(config.server.listen_addr, "0.0.0.0:9000");
        assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/council"));
        assert!(!config.storage.persist);
    }
}
