use breatheroom_core::{Config, ParticleField, RevealObserver};
use clap::Subcommand;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Subcommand)]
pub enum SceneAction {
    /// Generate the background particle field as JSON
    Particles {
        /// Number of particles (defaults to scene.particle_count)
        #[arg(long)]
        count: Option<usize>,
        /// Seed for a reproducible field
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Feed visibility ratios to the gallery reveal observer
    Reveal {
        /// Visible fractions of the gallery, in order (0.0 - 1.0)
        #[arg(required = true)]
        ratios: Vec<f64>,
    },
}

pub fn run(action: SceneAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();

    match action {
        SceneAction::Particles { count, seed } => {
            let count = count.unwrap_or(config.scene.particle_count);
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let field = ParticleField::generate(&mut rng, count);
            println!("{}", serde_json::to_string_pretty(&field)?);
        }
        SceneAction::Reveal { ratios } => {
            let mut observer = RevealObserver::new(config.scene.reveal_threshold);
            for ratio in ratios {
                if let Some(event) = observer.observe(ratio) {
                    println!("{}", serde_json::to_string_pretty(&event)?);
                }
            }
            println!("{{\"visible\": {}}}", observer.is_visible());
        }
    }
    Ok(())
}
