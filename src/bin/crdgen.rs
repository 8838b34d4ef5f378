//! # CRD Generator
//!
//! Generates the PushEncryptedSecret CustomResourceDefinition YAML from the
//! Rust type definitions.
//!
//! ## Usage
//!
//! ```bash
//! # Generate CRD YAML
//! cargo run --bin crdgen > config/crd/pushencryptedsecret.yaml
//!
//! # Generate and apply directly
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use kube::core::CustomResourceExt;
use pushsecret_controller::crd::PushEncryptedSecret;

fn main() {
    let crd = PushEncryptedSecret::crd();

    match serde_yaml::to_string(&crd) {
        Ok(yaml) => {
            // Header warning that the file is generated
            println!("# This file is auto-generated by crdgen");
            println!("# DO NOT EDIT THIS FILE MANUALLY");
            println!("# Change the Rust types in src/crd instead");
            println!("#");
            println!("---");
            print!("{yaml}");
        }
        Err(e) => {
            eprintln!("Failed to serialize CRD to YAML: {e}");
            std::process::exit(1);
        }
    }
}
