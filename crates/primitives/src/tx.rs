//! Transactions and their canonical encoding.

use alloy_consensus::{SignableTransaction, TxEip1559, TxEip2930, TxEip4844, TxEnvelope, TxLegacy};
pub use alloy_eips::eip2930::AccessListItem;
use alloy_eips::{eip2718::Encodable2718, eip2930::AccessList};
use alloy_primitives::{keccak256, Address, Bytes, Parity, Signature, TxKind, B256, U256};

use crate::{
    constants::{ACCESS_LIST_TX_TYPE, BLOB_TX_TYPE, DYNAMIC_FEE_TX_TYPE, GAS_PER_BLOB},
    errors::TxError,
};

/// Transaction envelope type.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TxType {
    #[default]
    Legacy,
    AccessList,
    DynamicFee,
    Blob,
}

impl TxType {
    /// The EIP-2718 type byte, `None` for legacy transactions.
    pub fn type_byte(self) -> Option<u8> {
        match self {
            TxType::Legacy => None,
            TxType::AccessList => Some(ACCESS_LIST_TX_TYPE),
            TxType::DynamicFee => Some(DYNAMIC_FEE_TX_TYPE),
            TxType::Blob => Some(BLOB_TX_TYPE),
        }
    }

    pub fn from_type_byte(b: u8) -> Option<Self> {
        match b {
            0x00 => Some(TxType::Legacy),
            ACCESS_LIST_TX_TYPE => Some(TxType::AccessList),
            DYNAMIC_FEE_TX_TYPE => Some(TxType::DynamicFee),
            BLOB_TX_TYPE => Some(TxType::Blob),
            _ => None,
        }
    }
}

/// A transaction as the test fixtures describe it.
///
/// The sender is given explicitly, signatures are carried only so the
/// canonical encoding can be reproduced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Transaction {
    pub kind: TxType,
    pub chain_id: u64,
    pub nonce: u64,
    pub sender: Address,

    /// Recipient, `None` for contract creation.
    pub to: Option<Address>,
    pub value: U256,
    pub data: Bytes,
    pub gas_limit: u64,

    /// Gas price for legacy and access list transactions, max fee per gas
    /// otherwise.
    pub max_gas_price: U256,

    /// Equal to `max_gas_price` for pre-1559 transactions.
    pub max_priority_gas_price: U256,
    pub max_blob_gas_price: U256,
    pub access_list: Vec<AccessListItem>,
    pub blob_hashes: Vec<B256>,

    pub v: U256,
    pub r: U256,
    pub s: U256,
}

impl Transaction {
    /// Blob gas this transaction consumes from the block budget.
    pub fn blob_gas_used(&self) -> u64 {
        GAS_PER_BLOB * self.blob_hashes.len() as u64
    }

    pub fn is_create(&self) -> bool {
        self.to.is_none()
    }

    /// Builds the signed EIP-2718 envelope the block commits to.
    ///
    /// A legacy envelope takes its chain id from `v` (EIP-155), so
    /// `chain_id` only reaches typed envelopes.
    pub fn envelope(&self) -> Result<TxEnvelope, TxError> {
        let (v, signature) = self.signature()?;
        let to = self.to.map_or(TxKind::Create, TxKind::Call);
        let access_list = AccessList(self.access_list.clone());

        let envelope: TxEnvelope = match self.kind {
            TxType::Legacy => TxLegacy {
                chain_id: (v >= 35).then(|| (v - 35) / 2),
                nonce: self.nonce,
                gas_price: fee("gas price", self.max_gas_price)?,
                gas_limit: self.gas_limit.into(),
                to,
                value: self.value,
                input: self.data.clone(),
            }
            .into_signed(signature)
            .into(),
            TxType::AccessList => TxEip2930 {
                chain_id: self.chain_id,
                nonce: self.nonce,
                gas_price: fee("gas price", self.max_gas_price)?,
                gas_limit: self.gas_limit.into(),
                to,
                value: self.value,
                access_list,
                input: self.data.clone(),
            }
            .into_signed(signature)
            .into(),
            TxType::DynamicFee => TxEip1559 {
                chain_id: self.chain_id,
                nonce: self.nonce,
                gas_limit: self.gas_limit.into(),
                max_fee_per_gas: fee("max fee per gas", self.max_gas_price)?,
                max_priority_fee_per_gas: fee(
                    "max priority fee per gas",
                    self.max_priority_gas_price,
                )?,
                to,
                value: self.value,
                access_list,
                input: self.data.clone(),
            }
            .into_signed(signature)
            .into(),
            TxType::Blob => TxEip4844 {
                chain_id: self.chain_id,
                nonce: self.nonce,
                gas_limit: self.gas_limit.into(),
                max_fee_per_gas: fee("max fee per gas", self.max_gas_price)?,
                max_priority_fee_per_gas: fee(
                    "max priority fee per gas",
                    self.max_priority_gas_price,
                )?,
                to: self.to.ok_or(TxError::BlobCreate)?,
                value: self.value,
                access_list,
                blob_versioned_hashes: self.blob_hashes.clone(),
                max_fee_per_blob_gas: fee("max fee per blob gas", self.max_blob_gas_price)?,
                input: self.data.clone(),
            }
            .into_signed(signature)
            .into(),
        };
        Ok(envelope)
    }

    /// Identity hash: keccak256 of the envelope encoding.
    pub fn hash(&self) -> Result<B256, TxError> {
        Ok(keccak256(self.envelope()?.encoded_2718()))
    }

    /// Signature with `v` interpreted for the envelope type: a y parity for
    /// typed transactions, 27/28 or EIP-155 for legacy ones.
    fn signature(&self) -> Result<(u64, Signature), TxError> {
        let invalid = || TxError::InvalidV {
            v: self.v,
            kind: self.kind,
        };
        let v = u64::try_from(self.v).map_err(|_| invalid())?;
        let parity = match (self.kind, v) {
            (_, 0 | 1) => Parity::Parity(v == 1),
            (TxType::Legacy, 27 | 28) => Parity::NonEip155(v == 28),
            (TxType::Legacy, 35..) => Parity::Eip155(v),
            _ => return Err(invalid()),
        };
        Ok((v, Signature::new(self.r, self.s, parity)))
    }
}

fn fee(field: &'static str, value: U256) -> Result<u128, TxError> {
    u128::try_from(value).map_err(|_| TxError::FeeTooLarge { field, value })
}

/// A transaction paired with the identity hash its fixture declared, if any.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TxEntry {
    pub tx: Transaction,
    pub declared_hash: Option<B256>,
}

impl TxEntry {
    pub fn new(tx: Transaction, declared_hash: Option<B256>) -> Self {
        Self { tx, declared_hash }
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, b256, hex};

    use super::*;

    fn word(b: B256) -> U256 {
        U256::from_be_bytes(b.0)
    }

    fn transfer(kind: TxType) -> Transaction {
        Transaction {
            kind,
            chain_id: 1,
            nonce: 0,
            sender: Address::repeat_byte(0xaa),
            to: Some(Address::repeat_byte(0xbb)),
            value: U256::from(1_000),
            gas_limit: 21_000,
            max_gas_price: U256::from(10),
            max_priority_gas_price: U256::from(10),
            v: U256::from(if kind == TxType::Legacy { 27 } else { 1 }),
            r: U256::from(1),
            s: U256::from(2),
            ..Default::default()
        }
    }

    #[test]
    fn test_eip155_legacy_vector() {
        // the worked example of EIP-155
        let tx = Transaction {
            nonce: 9,
            to: Some(Address::repeat_byte(0x35)),
            value: U256::from(1_000_000_000_000_000_000u64),
            gas_limit: 21_000,
            max_gas_price: U256::from(20_000_000_000u64),
            v: U256::from(37),
            r: word(b256!("28ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276")),
            s: word(b256!("67cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83")),
            ..Default::default()
        };
        let envelope = tx.envelope().unwrap();
        assert_eq!(
            envelope.encoded_2718(),
            hex!(
                "f86c098504a817c800825208943535353535353535353535353535353535353535"
                "880de0b6b3a76400008025"
                "a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276"
                "a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"
            )
        );
        assert_eq!(
            tx.hash().unwrap(),
            b256!("33469b22e9f636356c4160a87eb19df52b7412e8eac32a4a55ffe88ea8350788")
        );
    }

    #[test]
    fn test_pre_eip155_legacy_vector() {
        // mainnet 0x2084b8144eea4031c2fa7dfe343498c5e665ca85ed17825f2925f0b5b01c36ac
        let tx = Transaction {
            nonce: 12,
            to: Some(address!("2935aa0a2d2fbb791622c29eb1c117b65b7a9085")),
            gas_limit: 3_000_000,
            max_gas_price: U256::from(50_000_000_000u64),
            data: Bytes::copy_from_slice(&hex!(
                "590528a9000000000000000000000001878ace42092b7f1ae1f28d16c1272b1aa80ca467"
                "0000000000000000000000000000000000000000000000000000000000000002"
                "000000000000000000000000000000000000000000000000d02ab486cedc0000"
                "000000000000000000000000000000000000000000000000557fe293cabc08cf"
            )),
            v: U256::from(28),
            r: word(b256!("5bfaf3fda0a56b49cc78b22125feb5ae6a99d2b4781f00507d8b02c173771c85")),
            s: word(b256!("b5da0dbe6c5bc53740d0071fc83eb17ba0f709e49e9ae7df60dee625ef51afc5")),
            ..Default::default()
        };
        assert_eq!(
            tx.hash().unwrap(),
            b256!("2084b8144eea4031c2fa7dfe343498c5e665ca85ed17825f2925f0b5b01c36ac")
        );
    }

    #[test]
    fn test_access_list_vector() {
        let tx = Transaction {
            kind: TxType::AccessList,
            chain_id: 1,
            nonce: 3,
            to: Some(Address::repeat_byte(0x35)),
            gas_limit: 50_000,
            max_gas_price: U256::from(20_000_000_000u64),
            access_list: vec![AccessListItem {
                address: Address::repeat_byte(0x52),
                storage_keys: vec![B256::with_last_byte(1)],
            }],
            v: U256::from(1),
            r: word(b256!("cf024f4815304df2867a1a74e9d2707b6abda0337d2d54a4438d453f4160f190")),
            s: word(b256!("7ac0e6b3bc9395b5b9c8b9e6d77204a236577a5b18467b9175c01de4faa208d9")),
            ..Default::default()
        };
        assert_eq!(
            tx.envelope().unwrap().encoded_2718(),
            hex!(
                "01f89f01038504a817c80082c350943535353535353535353535353535353535353535"
                "8080f838f7945252525252525252525252525252525252525252e1a0"
                "0000000000000000000000000000000000000000000000000000000000000001"
                "01a0cf024f4815304df2867a1a74e9d2707b6abda0337d2d54a4438d453f4160f190"
                "a07ac0e6b3bc9395b5b9c8b9e6d77204a236577a5b18467b9175c01de4faa208d9"
            )
        );
        assert_eq!(
            tx.hash().unwrap(),
            b256!("300bdfbf124945fadc582e5a6ab375fe7dcf8fd284c3713aa303e94368d575ae")
        );
    }

    #[test]
    fn test_dynamic_fee_vector() {
        // mainnet 0x86718885c4b4218c6af87d3d0b0d83e3cc465df2a05c048aa4db9f1a6f9de91f
        let tx = Transaction {
            kind: TxType::DynamicFee,
            chain_id: 1,
            nonce: 495_885,
            to: Some(address!("388c818ca8b9251b393131c08a736a67ccb19297")),
            value: U256::from(225_408_989_626_789_916u64),
            gas_limit: 32_000,
            max_gas_price: U256::from(30_606_699_697u64),
            max_priority_gas_price: U256::ZERO,
            v: U256::from(1),
            r: word(b256!("cf024f4815304df2867a1a74e9d2707b6abda0337d2d54a4438d453f4160f190")),
            s: word(b256!("7ac0e6b3bc9395b5b9c8b9e6d77204a236577a5b18467b9175c01de4faa208d9")),
            ..Default::default()
        };
        assert_eq!(
            tx.hash().unwrap(),
            b256!("86718885c4b4218c6af87d3d0b0d83e3cc465df2a05c048aa4db9f1a6f9de91f")
        );
    }

    #[test]
    fn test_blob_vector() {
        // sepolia 0x9a22ccb0029bc8b0ddd073be1a1d923b7ae2b2ea52100bae0db4424f9107e9c0
        let tx = Transaction {
            kind: TxType::Blob,
            chain_id: 11_155_111,
            nonce: 4_002,
            to: Some(address!("11e9ca82a3a762b4b5bd264d4173a242e7a77064")),
            gas_limit: 21_000,
            max_gas_price: U256::from(200_000_000_000u64),
            max_priority_gas_price: U256::from(2_000_000_000u64),
            max_blob_gas_price: U256::from(20_000_000_000u64),
            blob_hashes: vec![
                b256!("012ec3d6f66766bedb002a190126b3549fce0047de0d4c25cffce0dc1c57921a"),
                b256!("0152d8e24762ff22b1cfd9f8c0683786a7ca63ba49973818b3d1e9512cd2cec4"),
                b256!("013b98c6c83e066d5b14af2b85199e3d4fc7d1e778dd53130d180f5077e2d1c7"),
                b256!("01148b495d6e859114e670ca54fb6e2657f0cbae5b08063605093a4b3dc9f8f1"),
                b256!("011ac212f13c5dff2b2c6b600a79635103d6f580a4221079951181b25c7e6549"),
            ],
            v: U256::from(1),
            r: word(b256!("c8de4cced43169f9aa3d36506363b2d2c44f6c49fc1fd91ea114c86f3757077e")),
            s: word(b256!("1e11fdd0d1934eda0492606ee0bb80a7bf8f35cc5f86ec60fe5031ba48bfd544")),
            ..Default::default()
        };
        assert_eq!(tx.blob_gas_used(), 5 * GAS_PER_BLOB);
        assert_eq!(
            tx.hash().unwrap(),
            b256!("9a22ccb0029bc8b0ddd073be1a1d923b7ae2b2ea52100bae0db4424f9107e9c0")
        );
    }

    #[test]
    fn test_typed_envelopes_prefixed() {
        for kind in [TxType::AccessList, TxType::DynamicFee, TxType::Blob] {
            let enc = transfer(kind).envelope().unwrap().encoded_2718();
            assert_eq!(Some(enc[0]), kind.type_byte());
            assert!(enc[1] >= 0xc0);
        }
        let legacy = transfer(TxType::Legacy).envelope().unwrap().encoded_2718();
        assert!(legacy[0] >= 0xc0);
    }

    #[test]
    fn test_chain_id_only_affects_typed_hash() {
        let mut legacy = transfer(TxType::Legacy);
        let h = legacy.hash().unwrap();
        legacy.chain_id = 5;
        assert_eq!(legacy.hash().unwrap(), h);

        let mut typed = transfer(TxType::DynamicFee);
        let h = typed.hash().unwrap();
        typed.chain_id = 5;
        assert_ne!(typed.hash().unwrap(), h);
    }

    #[test]
    fn test_create_encodes_empty_to() {
        let mut tx = transfer(TxType::Legacy);
        let call_len = tx.envelope().unwrap().encode_2718_len();
        tx.to = None;
        assert!(tx.is_create());
        assert_eq!(tx.envelope().unwrap().encode_2718_len(), call_len - 20);
    }

    #[test]
    fn test_unencodable_transactions() {
        let mut typed = transfer(TxType::DynamicFee);
        typed.v = U256::from(27);
        assert!(matches!(typed.hash(), Err(TxError::InvalidV { .. })));

        let mut legacy = transfer(TxType::Legacy);
        legacy.v = U256::from(30);
        assert!(matches!(legacy.hash(), Err(TxError::InvalidV { .. })));

        let mut pricey = transfer(TxType::Legacy);
        pricey.max_gas_price = U256::MAX;
        assert!(matches!(pricey.hash(), Err(TxError::FeeTooLarge { .. })));

        let mut blob_create = transfer(TxType::Blob);
        blob_create.to = None;
        assert_eq!(blob_create.hash(), Err(TxError::BlobCreate));
    }

    #[test]
    fn test_blob_gas_used() {
        let mut tx = transfer(TxType::Blob);
        assert_eq!(tx.blob_gas_used(), 0);
        tx.blob_hashes = vec![B256::ZERO; 3];
        assert_eq!(tx.blob_gas_used(), 3 * GAS_PER_BLOB);
    }
}
