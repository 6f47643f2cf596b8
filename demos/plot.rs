use std::env;

use diceplot::{compute_distribution_by_name, Chart, ChartStyle};
use log::info;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let kind = args.first().map_or("pdf", String::as_str);
    let aggregate = args.get(1).map_or("sum", String::as_str);
    let dice = args.get(2).map_or("3d6 + d20", String::as_str);
    let set = args.get(3).map(String::as_str);

    let chart = Chart::new(ChartStyle::default());
    match compute_distribution_by_name(kind, aggregate, dice, set) {
        Ok(Some(dist)) => print!("{}", chart.render(&dist)),
        Ok(None) => info!("nothing to plot for {dice:?}"),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    }
}
