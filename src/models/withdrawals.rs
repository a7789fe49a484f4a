use serde::Deserialize;

pub const METHOD_BANK_TRANSFER: &str = "bank_transfer";
pub const METHOD_CRYPTOCURRENCY: &str = "cryptocurrency";
pub const METHOD_PAYPAL: &str = "paypal";
pub const METHOD_MOBILE_MONEY: &str = "mobile_money";
pub const METHOD_BRAZILIAN_BANK: &str = "brazilian_bank";

/// Withdrawals require this much balance before any request is accepted.
pub const MINIMUM_BALANCE_IN_CENTS: i64 = 700 * 100;

pub struct CryptoAsset {
    pub name: &'static str,
    pub symbol: &'static str,
    pub network: &'static str,
    /// Minimum withdrawal in asset units.
    pub min_withdrawal: f64,
    /// Network fee in asset units.
    pub fee: f64,
}

pub const CRYPTO_ASSETS: [CryptoAsset; 8] = [
    CryptoAsset {
        name: "Bitcoin",
        symbol: "BTC",
        network: "Bitcoin Network",
        min_withdrawal: 0.001,
        fee: 0.0005,
    },
    CryptoAsset {
        name: "Ethereum",
        symbol: "ETH",
        network: "Ethereum Network",
        min_withdrawal: 0.01,
        fee: 0.005,
    },
    CryptoAsset {
        name: "Tether",
        symbol: "USDT",
        network: "ERC-20 / TRC-20",
        min_withdrawal: 10.0,
        fee: 1.0,
    },
    CryptoAsset {
        name: "USD Coin",
        symbol: "USDC",
        network: "ERC-20",
        min_withdrawal: 10.0,
        fee: 1.0,
    },
    CryptoAsset {
        name: "Binance Coin",
        symbol: "BNB",
        network: "BSC Network",
        min_withdrawal: 0.01,
        fee: 0.001,
    },
    CryptoAsset {
        name: "Cardano",
        symbol: "ADA",
        network: "Cardano Network",
        min_withdrawal: 10.0,
        fee: 1.0,
    },
    CryptoAsset {
        name: "Solana",
        symbol: "SOL",
        network: "Solana Network",
        min_withdrawal: 0.1,
        fee: 0.01,
    },
    CryptoAsset {
        name: "Polygon",
        symbol: "MATIC",
        network: "Polygon Network",
        min_withdrawal: 1.0,
        fee: 0.1,
    },
];

pub fn crypto_asset(symbol: &str) -> Option<&'static CryptoAsset> {
    CRYPTO_ASSETS.iter().find(|asset| asset.symbol == symbol)
}

/// BRL minimum charged by the withdrawal form: listed asset minimum at a
/// flat 100 BRL per unit, expressed in cents.
pub fn crypto_minimum_in_cents(asset: &CryptoAsset) -> i64 {
    (asset.min_withdrawal * 100.0 * 100.0).round() as i64
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct WithdrawForm {
    pub amount_in_cents: i64,
    pub method: String,
    pub crypto_symbol: Option<String>,
    pub wallet_address: Option<String>,
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub routing_number: Option<String>,
    pub swift_code: Option<String>,
    pub paypal_email: Option<String>,
    pub phone_number: Option<String>,
    pub brazilian_bank_code: Option<String>,
    pub brazilian_agency: Option<String>,
    pub brazilian_account: Option<String>,
    pub brazilian_account_type: Option<String>,
    pub brazilian_cpf: Option<String>,
    pub pix_key: Option<String>,
    pub account_details: Option<String>,
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum WithdrawError {
    #[error("Please fill in all required fields")]
    MissingFields,
    #[error("Please enter a valid amount")]
    InvalidAmount,
    #[error("Insufficient balance")]
    InsufficientBalance,
    #[error("You need to maintain a minimum balance of 700 BRL to process withdrawals")]
    BelowMinimumBalance,
    #[error("Please select a cryptocurrency")]
    MissingCrypto,
    #[error("Please enter wallet address")]
    MissingWalletAddress,
    #[error("Minimum withdrawal amount is R${minimum:.2}")]
    BelowCryptoMinimum { minimum: f64 },
    #[error("Please fill in all bank details")]
    MissingBankDetails,
    #[error("Please enter PayPal email")]
    MissingPaypalEmail,
    #[error("Please enter phone number")]
    MissingPhoneNumber,
    #[error("Please fill in all required Brazilian bank details")]
    MissingBrazilianDetails,
}

fn filled(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Withdrawal wizard validation, in the same order the form applies it.
/// Returns the human-readable details string recorded with the withdrawal
/// transaction. This is the only place an insufficient-balance rejection
/// happens; the balance mutator itself is unchecked.
pub fn validate(form: &WithdrawForm, balance_in_cents: i64) -> Result<String, WithdrawError> {
    if form.method.trim().is_empty() {
        return Err(WithdrawError::MissingFields);
    }
    if form.amount_in_cents <= 0 {
        return Err(WithdrawError::InvalidAmount);
    }
    if form.amount_in_cents > balance_in_cents {
        return Err(WithdrawError::InsufficientBalance);
    }

    if form.method == METHOD_CRYPTOCURRENCY {
        let Some(symbol) = filled(&form.crypto_symbol) else {
            return Err(WithdrawError::MissingCrypto);
        };
        let Some(asset) = crypto_asset(symbol) else {
            return Err(WithdrawError::MissingCrypto);
        };
        if filled(&form.wallet_address).is_none() {
            return Err(WithdrawError::MissingWalletAddress);
        }
        let minimum = crypto_minimum_in_cents(asset);
        if form.amount_in_cents < minimum {
            return Err(WithdrawError::BelowCryptoMinimum {
                minimum: minimum as f64 / 100.0,
            });
        }
    }

    let details = match form.method.as_str() {
        METHOD_BANK_TRANSFER => {
            let (Some(bank), Some(account)) = (filled(&form.bank_name), filled(&form.account_number))
            else {
                return Err(WithdrawError::MissingBankDetails);
            };
            format!(
                "Bank: {}, Account: {}, Routing: {}, SWIFT: {}",
                bank,
                account,
                form.routing_number.as_deref().unwrap_or(""),
                form.swift_code.as_deref().unwrap_or("")
            )
        }
        METHOD_CRYPTOCURRENCY => {
            // Presence checked above.
            let symbol = form.crypto_symbol.as_deref().unwrap_or("");
            let asset = crypto_asset(symbol).map(|a| a.name).unwrap_or(symbol);
            format!(
                "{} ({}) - Wallet: {}",
                asset,
                symbol,
                form.wallet_address.as_deref().unwrap_or("")
            )
        }
        METHOD_PAYPAL => {
            let Some(email) = filled(&form.paypal_email) else {
                return Err(WithdrawError::MissingPaypalEmail);
            };
            format!("PayPal: {}", email)
        }
        METHOD_MOBILE_MONEY => {
            let Some(phone) = filled(&form.phone_number) else {
                return Err(WithdrawError::MissingPhoneNumber);
            };
            format!("Mobile Money: {}", phone)
        }
        METHOD_BRAZILIAN_BANK => {
            let (Some(code), Some(agency), Some(account), Some(account_type), Some(cpf)) = (
                filled(&form.brazilian_bank_code),
                filled(&form.brazilian_agency),
                filled(&form.brazilian_account),
                filled(&form.brazilian_account_type),
                filled(&form.brazilian_cpf),
            ) else {
                return Err(WithdrawError::MissingBrazilianDetails);
            };
            let mut details = format!(
                "Brazilian Bank: {}, Agency: {}, Account: {} ({}), CPF/CNPJ: {}",
                code, agency, account, account_type, cpf
            );
            if let Some(pix) = filled(&form.pix_key) {
                details.push_str(&format!(", PIX: {}", pix));
            }
            details
        }
        _ => form.account_details.clone().unwrap_or_default(),
    };

    if balance_in_cents < MINIMUM_BALANCE_IN_CENTS {
        return Err(WithdrawError::BelowMinimumBalance);
    }

    Ok(details)
}
