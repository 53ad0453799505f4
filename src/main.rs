fn main() {
    hilos::cli::main()
}
