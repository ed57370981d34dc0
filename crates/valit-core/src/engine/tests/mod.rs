mod solver_contract_tests;
mod support;
