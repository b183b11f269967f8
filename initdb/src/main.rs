//! A helper program to initialize the database, optionally with a sample
//! catalog for local testing.

use std::env;

use movine::Movine;
use postgres::{Client, NoTls};

use log::{debug, info, initialize_logger};

const SEED_VARIABLE: &str = "BOOKINGS_SEED_CATALOG";

fn main() {
    dotenv::dotenv().ok();

    let logger = initialize_logger();
    let connection_string = env::var("BOOKINGS_DB_CONNECTION_STRING")
        .expect("could not read BOOKINGS_DB_CONNECTION_STRING");

    debug!(logger, "Connecting to database...");

    let client = Client::connect(&connection_string, NoTls).expect("could not connect to database");

    let mut movine = Movine::new(client);
    movine.set_migration_dir("./migrations");

    if movine.status().is_err() {
        debug!(logger, "Initializing movine...");
        movine.initialize().expect("failed to initialize movine")
    }

    debug!(logger, "Running migrations...");
    movine.up().expect("failed to run migrations");

    if should_seed() {
        info!(logger, "Seeding catalog...");

        let mut client =
            Client::connect(&connection_string, NoTls).expect("could not connect to database");
        client
            .batch_execute(include_str!("../seed.sql"))
            .expect("failed to seed catalog");
    }

    debug!(logger, "Completed initialization.");
}

fn should_seed() -> bool {
    matches!(
        env::var(SEED_VARIABLE).as_deref().map(str::trim),
        Ok("1") | Ok("true")
    )
}
