mod test_utils;
mod types_tests;
mod geotiff_tests;
