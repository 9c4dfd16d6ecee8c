//! Proxy type synthesizer and projections

mod projection;
mod synthesizer;

pub use projection::{initialize_proxy, Projection};
pub use synthesizer::{
    InterfaceSet, ProxyMember, ProxySynthesizer, ProxyType, ProxyTypeKey, ShadowedMember,
};
