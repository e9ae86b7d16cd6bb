//! Deterministic random streams, one per rule domain.
use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;
use std::cell::{RefCell, RefMut};

/// Deterministic bundle of RNG streams segregated by rule domain.
///
/// Event selection, effect rolls and combat never share a stream, so adding a
/// draw in one domain does not shift the outcomes of another.
#[derive(Debug, Clone)]
pub struct RngBundle {
    seed: u64,
    selection: RefCell<CountingRng<ChaCha20Rng>>,
    effects: RefCell<CountingRng<ChaCha20Rng>>,
    combat: RefCell<CountingRng<ChaCha20Rng>>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            seed,
            selection: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"selection"))),
            effects: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"effects"))),
            combat: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"combat"))),
        }
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Access the event selection stream.
    #[must_use]
    pub fn selection(&self) -> RefMut<'_, CountingRng<ChaCha20Rng>> {
        self.selection.borrow_mut()
    }

    /// Access the stream used for ranged effects and auto-roll checks.
    #[must_use]
    pub fn effects(&self) -> RefMut<'_, CountingRng<ChaCha20Rng>> {
        self.effects.borrow_mut()
    }

    /// Access the combat stream.
    #[must_use]
    pub fn combat(&self) -> RefMut<'_, CountingRng<ChaCha20Rng>> {
        self.combat.borrow_mut()
    }

    /// Draw counts per stream as `(selection, effects, combat)`.
    #[must_use]
    pub fn draw_counts(&self) -> (u64, u64, u64) {
        (
            self.selection.borrow().draws(),
            self.effects.borrow().draws(),
            self.combat.borrow().draws(),
        )
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<ChaCha20Rng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl<R: rand::RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: rand::RngCore> rand::RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    // HMAC accepts keys of any length.
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0_u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}
