//! SHA-2 digest module

use subtilis_crypto::hash;

use crate::{
    error::{Error, Result},
    params::{HashAlg, NormalizedAlgorithm},
    registry::{AlgorithmModule, Operation},
};

pub(super) static SHA: ShaModule = ShaModule;

/// One module serves all three registered digest names
pub(super) struct ShaModule;

impl AlgorithmModule for ShaModule {
    fn supports(&self, op: Operation) -> bool {
        matches!(op, Operation::Digest)
    }

    fn digest(&self, alg: &NormalizedAlgorithm, data: &[u8]) -> Result<Vec<u8>> {
        let hash = match alg.name {
            "SHA-256" => HashAlg::Sha256,
            "SHA-384" => HashAlg::Sha384,
            "SHA-512" => HashAlg::Sha512,
            other => {
                return Err(Error::NotSupported(format!("unknown digest {other}")));
            }
        };
        Ok(hash::digest(hash, data))
    }
}
