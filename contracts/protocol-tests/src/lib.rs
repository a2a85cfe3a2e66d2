#![cfg(test)]

//! Runs the credit token, ledger, loan book and auction engine together in
//! one test environment.

mod setup;

mod auction;
mod loan_book;
mod scenarios;
