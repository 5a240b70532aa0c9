// SPDX-License-Identifier: Apache-2.0

//! GET APP CONFIGURATION command implementation

use async_trait::async_trait;
use ledger_device_base::reader::AnswerReader;
use ledger_device_base::{App, AppExt};
use ledger_transport::{APDUCommand, Exchange};

use crate::errors::{EthAppError, EthAppResult};
use crate::instructions::ins;
use crate::types::{AppConfiguration, AppVersion, ConfigFlags};
use crate::EthApp;

#[async_trait]
pub trait GetConfiguration<E>
where
    E: Exchange + Send + Sync,
    E::Error: std::error::Error,
{
    /// Get Ethereum application configuration
    async fn get_configuration(transport: &E) -> EthAppResult<AppConfiguration, E::Error>;
}

#[async_trait]
impl<E> GetConfiguration<E> for EthApp
where
    E: Exchange + Send + Sync,
    E::Error: std::error::Error,
{
    async fn get_configuration(transport: &E) -> EthAppResult<AppConfiguration, E::Error> {
        let command = APDUCommand {
            cla: Self::CLA,
            ins: ins::GET_APP_CONFIGURATION,
            p1: 0x00,
            p2: 0x00,
            data: Vec::new(),
        };

        let response = transport
            .exchange(&command)
            .await
            .map_err(|e| EthAppError::Transport(e.into()))?;
        <EthApp as AppExt<E>>::handle_response_error(&response)?;

        parse_get_configuration_response::<E::Error>(response.data())
    }
}

/// Parse GET APP CONFIGURATION response: flags followed by major, minor, patch
fn parse_get_configuration_response<E: std::error::Error>(
    data: &[u8],
) -> EthAppResult<AppConfiguration, E> {
    let mut reader = AnswerReader::new(data);

    let flags = ConfigFlags(reader.read_u8("configuration flags")?);
    let version = AppVersion {
        major: reader.read_u8("major version")?,
        minor: reader.read_u8("minor version")?,
        patch: reader.read_u8("patch version")?,
    };

    Ok(AppConfiguration { flags, version })
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use ledger_device_base::LedgerAppError;
    use ledger_transport::mock::MockExchange;

    use super::*;

    #[test]
    fn test_get_configuration_command() {
        let mock = MockExchange::new().with_answer(&[0x01, 1, 10, 4], 0x9000);

        let config = block_on(EthApp::get_configuration(&mock)).unwrap();
        assert_eq!(config.version.to_string(), "1.10.4");
        assert_eq!(mock.requests(), vec![vec![0xE0, 0x06, 0x00, 0x00, 0x00]]);
    }

    #[test]
    fn test_get_configuration_app_closed() {
        let mock = MockExchange::new().with_answer(&[], 0x6E00);

        let err = block_on(EthApp::get_configuration(&mock)).unwrap_err();
        assert_eq!(err, EthAppError::Transport(LedgerAppError::AppNotOpen));
    }

    #[test]
    fn test_parse_get_configuration_flags() {
        let arbitrary = ConfigFlags::ARBITRARY_DATA_SIGNATURE;
        let erc20 = ConfigFlags::ERC20_EXTERNAL_INFO;
        let check = ConfigFlags::TRANSACTION_CHECK_ENABLED;
        let opt_in = ConfigFlags::TRANSACTION_CHECK_OPT_IN;

        // answer, flags (arbitrary, erc20, check, opt-in), version
        let cases = [
            ([arbitrary | erc20, 1, 2, 3], [true, true, false, false], "1.2.3"),
            ([arbitrary | erc20 | check | opt_in, 2, 1, 0], [true; 4], "2.1.0"),
            ([0x00, 0, 9, 15], [false; 4], "0.9.15"),
            ([check | 0x04, 1, 0, 0], [false, false, true, false], "1.0.0"),
        ];

        for (answer, expected, version) in cases {
            let config = parse_get_configuration_response::<std::io::Error>(&answer).unwrap();
            let flags = config.flags;

            assert_eq!(
                [
                    flags.arbitrary_data_signature(),
                    flags.erc20_external_info(),
                    flags.transaction_check_enabled(),
                    flags.transaction_check_opt_in(),
                ],
                expected,
                "flags byte {:#04x}",
                answer[0]
            );
            assert_eq!(flags, ConfigFlags(answer[0]));
            assert_eq!(config.version.to_string(), version);
        }
    }

    #[test]
    fn test_parse_get_configuration_truncated() {
        let answers: [&[u8]; 3] = [&[], &[0x01], &[0x01, 1, 2]];
        for answer in answers {
            assert!(matches!(
                parse_get_configuration_response::<std::io::Error>(answer),
                Err(EthAppError::Transport(LedgerAppError::InvalidResponseData(_)))
            ));
        }
    }
}
