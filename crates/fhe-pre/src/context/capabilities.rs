//! Features that can be enabled on a crypto context.

use std::fmt::Display;

/// A capability of a crypto context. Operations check that the features they
/// rely on are enabled before doing any work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Key generation, public-key encryption and decryption.
    PublicKeyEncryption,
    /// Generation and use of key-switching keys.
    KeySwitching,
    /// Leveled somewhat homomorphic operations: addition, multiplication and
    /// relinearization.
    LeveledShe,
    /// Rotation-based operations such as slot summation.
    AdvancedShe,
    /// Proxy re-encryption between key pairs.
    ProxyReEncryption,
}

impl Feature {
    /// All the features, in dependency order.
    pub const ALL: [Feature; 5] = [
        Feature::PublicKeyEncryption,
        Feature::KeySwitching,
        Feature::LeveledShe,
        Feature::AdvancedShe,
        Feature::ProxyReEncryption,
    ];

    const fn bit(self) -> u8 {
        match self {
            Feature::PublicKeyEncryption => 1,
            Feature::KeySwitching => 1 << 1,
            Feature::LeveledShe => 1 << 2,
            Feature::AdvancedShe => 1 << 3,
            Feature::ProxyReEncryption => 1 << 4,
        }
    }

    /// Features which must be enabled for this one to work.
    pub const fn dependencies(self) -> &'static [Feature] {
        match self {
            Feature::PublicKeyEncryption => &[],
            Feature::KeySwitching => &[Feature::PublicKeyEncryption],
            Feature::LeveledShe => &[Feature::PublicKeyEncryption, Feature::KeySwitching],
            Feature::AdvancedShe => &[Feature::LeveledShe],
            Feature::ProxyReEncryption => {
                &[Feature::PublicKeyEncryption, Feature::KeySwitching]
            }
        }
    }
}

impl Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Feature::PublicKeyEncryption => "PKE",
            Feature::KeySwitching => "KEYSWITCH",
            Feature::LeveledShe => "LEVELEDSHE",
            Feature::AdvancedShe => "ADVANCEDSHE",
            Feature::ProxyReEncryption => "PRE",
        };
        f.write_str(name)
    }
}

/// Set of enabled features, always closed under [`Feature::dependencies`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capabilities(u8);

impl Capabilities {
    /// Every feature enabled.
    pub fn all() -> Self {
        Self::from_features(&Feature::ALL)
    }

    /// The smallest set containing `features` and their dependencies.
    pub fn from_features(features: &[Feature]) -> Self {
        let mut caps = Self(0);
        for feature in features {
            caps.enable(*feature);
        }
        caps
    }

    /// Enable a feature along with its dependencies.
    pub fn enable(&mut self, feature: Feature) {
        self.0 |= feature.bit();
        for dependency in feature.dependencies() {
            self.enable(*dependency);
        }
    }

    /// Whether a feature is enabled.
    pub const fn contains(&self, feature: Feature) -> bool {
        self.0 & feature.bit() != 0
    }

    /// Iterate over the enabled features.
    pub fn iter(&self) -> impl Iterator<Item = Feature> + '_ {
        Feature::ALL.into_iter().filter(|f| self.contains(*f))
    }

    pub(crate) const fn bits(&self) -> u32 {
        self.0 as u32
    }

    pub(crate) fn from_bits(bits: u32) -> Option<Self> {
        let caps = Self::from_features(
            &Feature::ALL
                .into_iter()
                .filter(|f| bits & f.bit() as u32 != 0)
                .collect::<Vec<_>>(),
        );
        (caps.bits() == bits).then_some(caps)
    }
}
