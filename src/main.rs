use anyhow::Result;

fn main() -> Result<()> {
    let args = linkstash::cli::parse();
    linkstash::app::run(args)
}
