pub mod body_signature;
