//! `yadz hash --city C --street S --house-num N`

use anyhow::Result;
use clap::Args;
use yadz_core::{Address, address_hash, storage_key};

#[derive(Args)]
pub struct HashArgs {
    #[arg(long)]
    pub city: String,

    #[arg(long)]
    pub street: String,

    #[arg(long)]
    pub house_num: String,
}

pub fn run(args: HashArgs) -> Result<()> {
    let address = Address::new(args.city, args.street, args.house_num);
    if !address.is_complete() {
        tracing::warn!("address is incomplete and would be skipped during scans: {address:?}");
    }
    println!("{}", storage_key(&address_hash(&address)));
    Ok(())
}
