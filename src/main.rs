use http_bomber::error::AppResult;

fn main() -> AppResult<()> {
    http_bomber::run()
}
