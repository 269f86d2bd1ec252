fn main() -> anyhow::Result<()> {
    dhikrflow_lib::run()
}
