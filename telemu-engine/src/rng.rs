//! Deterministic random streams, one per concern.
use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use sha2::Sha256;

/// Key under which every stream seed is derived.
const STREAM_KEY: &[u8] = b"telemu-stream-v1";

/// Independent RNG streams derived from one user seed.
///
/// Route choices, driver behaviour and instrument jitter draw from separate
/// streams so that, for example, reading more instruments never changes the
/// route the vehicle takes.
#[derive(Debug, Clone)]
pub struct RngBundle {
    route: SmallRng,
    driver: SmallRng,
    instruments: SmallRng,
}

impl RngBundle {
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            route: stream(seed, Stream::Route),
            driver: stream(seed, Stream::Driver),
            instruments: stream(seed, Stream::Instruments),
        }
    }

    /// Start vertex and neighbour selection.
    pub fn route(&mut self) -> &mut SmallRng {
        &mut self.route
    }

    /// Madness drift and lane changes.
    pub fn driver(&mut self) -> &mut SmallRng {
        &mut self.driver
    }

    /// Smoothed instrument signals.
    pub fn instruments(&mut self) -> &mut SmallRng {
        &mut self.instruments
    }
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Route,
    Driver,
    Instruments,
}

impl Stream {
    const fn label(self) -> &'static [u8] {
        match self {
            Self::Route => b"route",
            Self::Driver => b"driver",
            Self::Instruments => b"instruments",
        }
    }
}

/// HMAC-SHA256 of `label || seed`, folded to the 64-bit seed `SmallRng` takes.
fn stream(seed: u64, which: Stream) -> SmallRng {
    let mut mac = Hmac::<Sha256>::new_from_slice(STREAM_KEY).expect("HMAC accepts any key length");
    mac.update(which.label());
    mac.update(&seed.to_be_bytes());
    let digest = mac.finalize().into_bytes();
    let folded = digest
        .chunks_exact(8)
        .map(|chunk| {
            let mut word = [0_u8; 8];
            word.copy_from_slice(chunk);
            u64::from_be_bytes(word)
        })
        .fold(0, |acc, word| acc ^ word);
    SmallRng::seed_from_u64(folded)
}
