#![allow(missing_docs)]
// Messages written in the form emitted by prost-build for `pre.proto`.

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Parameters {
    #[prost(int32, tag = "1")]
    pub scheme: i32,
    #[prost(uint32, tag = "2")]
    pub degree: u32,
    #[prost(uint64, tag = "3")]
    pub plaintext: u64,
    #[prost(uint64, repeated, tag = "4")]
    pub moduli: ::prost::alloc::vec::Vec<u64>,
    #[prost(uint64, tag = "5")]
    pub special_modulus: u64,
    #[prost(uint32, tag = "6")]
    pub variance: u32,
    #[prost(uint32, tag = "7")]
    pub multiplicative_depth: u32,
    #[prost(uint32, tag = "8")]
    pub scaling_mod_size: u32,
    #[prost(uint32, tag = "9")]
    pub first_mod_size: u32,
    #[prost(uint32, tag = "10")]
    pub batch_size: u32,
    #[prost(int32, tag = "11")]
    pub security_level: i32,
    #[prost(uint32, tag = "12")]
    pub features: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Ciphertext {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub c: ::prost::alloc::vec::Vec<::prost::alloc::vec::Vec<u8>>,
    #[prost(uint32, tag = "2")]
    pub level: u32,
    #[prost(uint32, tag = "3")]
    pub depth: u32,
    #[prost(bytes = "vec", tag = "4")]
    pub key_id: ::prost::alloc::vec::Vec<u8>,
    #[prost(double, tag = "5")]
    pub scale: f64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PublicKey {
    #[prost(bytes = "vec", tag = "1")]
    pub c0: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub seed: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub key_id: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct KeySwitchingKey {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub c0: ::prost::alloc::vec::Vec<::prost::alloc::vec::Vec<u8>>,
    #[prost(bytes = "vec", repeated, tag = "2")]
    pub c1: ::prost::alloc::vec::Vec<::prost::alloc::vec::Vec<u8>>,
    #[prost(bytes = "vec", tag = "3")]
    pub seed: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RelinearizationKey {
    #[prost(message, optional, tag = "1")]
    pub ksk: ::core::option::Option<KeySwitchingKey>,
    #[prost(bytes = "vec", tag = "2")]
    pub key_id: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GaloisKey {
    #[prost(message, optional, tag = "1")]
    pub ksk: ::core::option::Option<KeySwitchingKey>,
    #[prost(uint32, tag = "2")]
    pub element: u32,
    #[prost(bytes = "vec", tag = "3")]
    pub key_id: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EvalSumKey {
    #[prost(message, repeated, tag = "1")]
    pub gk: ::prost::alloc::vec::Vec<GaloisKey>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReEncryptionKey {
    #[prost(message, optional, tag = "1")]
    pub ksk: ::core::option::Option<KeySwitchingKey>,
    #[prost(bytes = "vec", tag = "2")]
    pub from: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub to: ::prost::alloc::vec::Vec<u8>,
}
