pub(crate) mod authenticated_principal;
