//! Security levels and the largest modulus each ring dimension supports.

/// Target security level, following the homomorphic encryption standard
/// for ternary secrets against classical attackers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SecurityLevel {
    /// 128 bits of classical security.
    #[default]
    Classic128,
    /// 192 bits of classical security.
    Classic192,
    /// 256 bits of classical security.
    Classic256,
    /// No security constraint; the ring dimension must be set explicitly.
    NotSet,
}

/// Ring dimensions covered by the standard, in increasing order.
pub(crate) const DEGREES: [usize; 6] = [1024, 2048, 4096, 8192, 16384, 32768];

const MAX_LOG_QP_128: [usize; 6] = [27, 54, 109, 218, 438, 881];
const MAX_LOG_QP_192: [usize; 6] = [19, 37, 75, 152, 305, 611];
const MAX_LOG_QP_256: [usize; 6] = [14, 29, 58, 118, 237, 476];

impl SecurityLevel {
    /// Largest bit size of the key-switching modulus for a ring dimension,
    /// or `None` when unconstrained. Degrees below 1024 have no secure
    /// modulus and degrees above 32768 reuse the 32768 bound.
    pub fn max_log_qp(&self, degree: usize) -> Option<usize> {
        let table = match self {
            SecurityLevel::Classic128 => &MAX_LOG_QP_128,
            SecurityLevel::Classic192 => &MAX_LOG_QP_192,
            SecurityLevel::Classic256 => &MAX_LOG_QP_256,
            SecurityLevel::NotSet => return None,
        };
        if degree < DEGREES[0] {
            return Some(0);
        }
        let i = DEGREES
            .iter()
            .rposition(|d| *d <= degree)
            .unwrap_or_default();
        Some(table[i])
    }

    pub(crate) const fn to_i32(self) -> i32 {
        match self {
            SecurityLevel::Classic128 => 1,
            SecurityLevel::Classic192 => 2,
            SecurityLevel::Classic256 => 3,
            SecurityLevel::NotSet => 4,
        }
    }

    pub(crate) const fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(SecurityLevel::Classic128),
            2 => Some(SecurityLevel::Classic192),
            3 => Some(SecurityLevel::Classic256),
            4 => Some(SecurityLevel::NotSet),
            _ => None,
        }
    }
}
