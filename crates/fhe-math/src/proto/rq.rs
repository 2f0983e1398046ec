// Protobuf messages for polynomials, written in the form emitted by
// prost-build for `rq.proto`.

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Rq {
    #[prost(enumeration = "Representation", tag = "1")]
    pub representation: i32,
    #[prost(uint32, tag = "2")]
    pub degree: u32,
    #[prost(uint64, repeated, tag = "3")]
    pub moduli: ::prost::alloc::vec::Vec<u64>,
    #[prost(bytes = "vec", tag = "4")]
    pub coefficients: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Representation {
    Unknown = 0,
    Powerbasis = 1,
    Ntt = 2,
}
