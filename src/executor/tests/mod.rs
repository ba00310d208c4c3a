mod helpers;

mod fixture_tests;
mod operator_tests;
mod resource_tests;
