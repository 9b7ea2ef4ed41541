fn main() -> anyhow::Result<()> {
    lull::logging::init_tracing();
    let options = lull::app::Options::parse(std::env::args().skip(1))?;
    lull::app::run(options)
}
