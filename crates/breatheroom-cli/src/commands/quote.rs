use breatheroom_core::quotes::{self, QUOTES};

pub fn run(all: bool) -> Result<(), Box<dyn std::error::Error>> {
    if all {
        for quote in QUOTES {
            println!("{quote}");
        }
    } else {
        println!("{}", quotes::pick(&mut rand::thread_rng()));
    }
    Ok(())
}
