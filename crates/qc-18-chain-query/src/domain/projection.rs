//! Wire container projection.
//!
//! The query engine produces [`BlockRecord`]s once; each API schema turns
//! them into its own container type through a [`ContainerProjection`].

use super::block::BlockRecord;
use serde::{Deserialize, Serialize};
use shared_types::{BeaconBlock, BlsSignature, ForkVersion, Hash};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProjectionError {
    #[error("block type is not recognized: {0:?}")]
    UnsupportedFork(ForkVersion),

    #[error("blinded blocks are not available before bellatrix ({0:?})")]
    BlindedBeforeBellatrix(ForkVersion),
}

/// Conversion of a block record into a wire schema's container.
pub trait ContainerProjection {
    type Output;

    fn project(record: &BlockRecord) -> Result<Self::Output, ProjectionError>;
}

/// Fork-tagged block body of the v1alpha1 schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForkBlock {
    Phase0(SignedBlockBody),
    Altair(SignedBlockBody),
    Bellatrix(SignedBlockBody),
    BlindedBellatrix(SignedBlockBody),
}

/// Message and signature as carried on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedBlockBody {
    pub message: BeaconBlock,
    pub signature: Vec<u8>,
}

impl SignedBlockBody {
    fn new(message: &BeaconBlock, signature: &BlsSignature) -> Self {
        Self {
            message: message.clone(),
            signature: signature.to_vec(),
        }
    }
}

/// v1alpha1 block container: any fork, with root and canonical flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct V1Alpha1Container {
    pub block: ForkBlock,
    pub block_root: Hash,
    pub canonical: bool,
}

pub struct V1Alpha1Projection;

impl ContainerProjection for V1Alpha1Projection {
    type Output = V1Alpha1Container;

    fn project(record: &BlockRecord) -> Result<Self::Output, ProjectionError> {
        let signed = &record.signed_block;
        let body = SignedBlockBody::new(&signed.message, &signed.signature);
        let block = match (signed.fork, signed.blinded) {
            (ForkVersion::Phase0, false) => ForkBlock::Phase0(body),
            (ForkVersion::Altair, false) => ForkBlock::Altair(body),
            (ForkVersion::Bellatrix, false) => ForkBlock::Bellatrix(body),
            (ForkVersion::Bellatrix, true) => ForkBlock::BlindedBellatrix(body),
            (fork, true) => return Err(ProjectionError::BlindedBeforeBellatrix(fork)),
        };
        Ok(V1Alpha1Container {
            block,
            block_root: record.root,
            canonical: record.is_canonical,
        })
    }
}

/// v1 block container: phase0 blocks only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct V1Container {
    pub block: SignedBlockBody,
    pub block_root: Hash,
    pub canonical: bool,
}

pub struct V1Projection;

impl ContainerProjection for V1Projection {
    type Output = V1Container;

    fn project(record: &BlockRecord) -> Result<Self::Output, ProjectionError> {
        let signed = &record.signed_block;
        if signed.fork != ForkVersion::Phase0 || signed.blinded {
            return Err(ProjectionError::UnsupportedFork(signed.fork));
        }
        Ok(V1Container {
            block: SignedBlockBody::new(&signed.message, &signed.signature),
            block_root: record.root,
            canonical: record.is_canonical,
        })
    }
}
