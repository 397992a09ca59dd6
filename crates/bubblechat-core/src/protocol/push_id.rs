//! Store-assigned child keys.
//!
//! 8 characters of millisecond timestamp followed by 12 random characters,
//! drawn from an alphabet whose ASCII order matches its digit order. Keys
//! generated within the same millisecond reuse the previous random part
//! incremented by one, so keys from one generator sort strictly in creation
//! order.

use std::sync::Mutex;

use rand::Rng;

use crate::clock::now_millis;

const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";
const TIME_LEN: usize = 8;
const RAND_LEN: usize = 12;

/// Length of a generated key.
pub const PUSH_KEY_LEN: usize = TIME_LEN + RAND_LEN;

struct PushState {
    last_ms: u64,
    rand: [u8; RAND_LEN],
}

pub struct PushIdGenerator {
    state: Mutex<PushState>,
}

static GLOBAL: PushIdGenerator = PushIdGenerator::new();

/// Next key from the process-wide generator.
pub fn next_push_key() -> String {
    GLOBAL.next()
}

impl Default for PushIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl PushIdGenerator {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(PushState {
                last_ms: 0,
                rand: [0; RAND_LEN],
            }),
        }
    }

    pub fn next(&self) -> String {
        self.next_at(now_millis())
    }

    pub fn next_at(&self, now_ms: u64) -> String {
        let rand = match self.state.lock() {
            Ok(mut st) => {
                if st.last_ms == now_ms {
                    increment(&mut st.rand);
                } else {
                    st.last_ms = now_ms;
                    st.rand = fresh();
                }
                st.rand
            }
            // poisoned: a fresh random tail is still unique enough
            Err(_) => fresh(),
        };

        let mut out = String::with_capacity(PUSH_KEY_LEN);
        let mut head = [0u8; TIME_LEN];
        let mut ts = now_ms;
        for slot in head.iter_mut().rev() {
            *slot = PUSH_CHARS[(ts % 64) as usize];
            ts /= 64;
        }
        out.extend(head.iter().map(|&b| b as char));
        out.extend(rand.iter().map(|&i| PUSH_CHARS[i as usize] as char));
        out
    }
}

fn fresh() -> [u8; RAND_LEN] {
    let mut rng = rand::thread_rng();
    let mut r = [0u8; RAND_LEN];
    for slot in r.iter_mut() {
        *slot = rng.gen_range(0..64);
    }
    r
}

fn increment(rand: &mut [u8; RAND_LEN]) {
    for slot in rand.iter_mut().rev() {
        if *slot == 63 {
            *slot = 0;
        } else {
            *slot += 1;
            return;
        }
    }
}
