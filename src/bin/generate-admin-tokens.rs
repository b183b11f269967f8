use std::error::Error;

use dotenv::dotenv;
use log::{debug, info, initialize_logger};
use structopt::StructOpt;

use bookings::config::get_variable;
use bookings::db::{AdminTokens, PgDb};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "generate-admin-tokens",
    about = "Generate and print administrator tokens"
)]
struct Opt {
    /// How many tokens to generate
    #[structopt(short, long, default_value = "1")]
    count: u8,

    /// A note on who the tokens are for
    #[structopt(short, long)]
    label: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();

    let opt = Opt::from_args();

    let logger = initialize_logger();

    let connection_string = get_variable("BOOKINGS_DB_CONNECTION_STRING");
    let pool = sqlx::Pool::connect(&connection_string).await?;
    let db = PgDb::new(pool);

    info!(logger, "Generating {} admin tokens...", opt.count; "label" => ?opt.label);

    let mut tokens = vec![];

    for number in 1..=opt.count {
        let token = db.create_admin_token(opt.label.clone()).await?;
        debug!(logger, "Generated token #{}: {}", number, token);
        tokens.push(token);
    }

    println!(
        "{}",
        tokens
            .into_iter()
            .map(|t| format!("{}", t))
            .collect::<Vec<_>>()
            .join("\n")
    );

    Ok(())
}
