use kvbench::error::AppResult;

fn main() -> AppResult<()> {
    kvbench::entry::run()
}
