//! Prints an Argon2id hash for a seed user's `password_hash`.
//!
//! The password is taken from the first argument, or from the first line of
//! stdin when no argument is given.

use std::io::BufRead;

use scoreit_service::auth::password::hash_password;

fn main() {
    let password = match std::env::args().nth(1) {
        Some(password) => password,
        None => {
            let mut line = String::new();
            if let Err(err) = std::io::stdin().lock().read_line(&mut line) {
                eprintln!("Failed to read password from stdin: {err}");
                std::process::exit(1);
            }
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    if password.is_empty() {
        eprintln!("Usage: hash_password <password>  (or pipe the password on stdin)");
        std::process::exit(2);
    }

    match hash_password(&password) {
        Ok(hash) => println!("{hash}"),
        Err(err) => {
            eprintln!("Failed to hash password: {err}");
            std::process::exit(1);
        }
    }
}
