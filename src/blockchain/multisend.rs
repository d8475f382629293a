// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Multi-send contract ABI.

use alloy::{primitives::Bytes, sol, sol_types::SolCall};

use super::types::MultiSendCall;

sol! {
    interface IMultiSend {
        function multiSendToken(address token, address[] recipients, uint256[] amounts) external;
    }
}

/// ABI-encode a `multiSendToken(token, recipients, amounts)` call.
pub fn encode_multi_send(call: &MultiSendCall) -> Bytes {
    IMultiSend::multiSendTokenCall {
        token: call.token,
        recipients: call.recipients.clone(),
        amounts: call.amounts.clone(),
    }
    .abi_encode()
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, U256};

    #[test]
    fn encodes_selector_and_arguments() {
        let call = MultiSendCall {
            token: address!("1303F139FEac224ff877e6071C782A41C30F3255"),
            recipients: vec![
                address!("1111111111111111111111111111111111111111"),
                address!("2222222222222222222222222222222222222222"),
            ],
            amounts: vec![U256::from(1u64), U256::from(2u64)],
        };

        let data = encode_multi_send(&call);
        assert_eq!(&data[..4], IMultiSend::multiSendTokenCall::SELECTOR.as_slice());

        let decoded = IMultiSend::multiSendTokenCall::abi_decode(&data).unwrap();
        assert_eq!(decoded.token, call.token);
        assert_eq!(decoded.recipients, call.recipients);
        assert_eq!(decoded.amounts, call.amounts);
    }
}
