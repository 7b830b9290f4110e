pub mod sender;

pub use self::sender::SenderWallet;
